use super::DependencyGraph;

/// Renders `graph` as a Graphviz dot digraph.
///
/// Tables without dependencies are declared on their own line, every other
/// table gets one `"dependent" -> "dependency"` line per dependency.
pub fn render_graph(graph: &DependencyGraph) -> String {
    let mut dot = String::from("digraph dependencies {\n");

    for (table, dependencies) in graph {
        if dependencies.is_empty() {
            dot.push_str(&quote_node(table));
            dot.push('\n');
        } else {
            for dependency in dependencies {
                dot.push_str(&quote_node(table));
                dot.push_str(" -> ");
                dot.push_str(&quote_node(dependency));
                dot.push('\n');
            }
        }
    }

    dot.push_str("}\n");
    dot
}

/// Quotes a node id, dot string rules only require escaping `"` and `\`.
fn quote_node(name: &str) -> String {
    let escaped = name.replace('\\', r"\\").replace('"', r#"\""#);

    format!("\"{escaped}\"")
}
