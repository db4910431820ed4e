use std::collections::BTreeSet;

use tapegrad::{Graph, Mark};

#[test]
fn export() {
    let graph = Graph::new();
    let a = graph.leaf(2.);
    let b = graph.leaf(3.);
    let c = graph.leaf(4.);
    let f = (a + b) * c;
    f.eval().unwrap();
    f.backprop().unwrap();

    let text = f.dot_builder().to_dot_string().unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.first(), Some(&"digraph ComputationGraph {"));
    assert_eq!(lines.last(), Some(&"}"));

    let statements: BTreeSet<_> = lines[1..lines.len() - 1].iter().copied().collect();
    let expected: BTreeSet<_> = [
        r#"    node4 [label="*\nvalue: 20.00\ngrad: 1.00"];"#,
        r#"    node3 [label="+\nvalue: 5.00\ngrad: 4.00"];"#,
        r#"    node0 [label="var\nvalue: 2.00\ngrad: 4.00"];"#,
        r#"    node1 [label="var\nvalue: 3.00\ngrad: 4.00"];"#,
        r#"    node2 [label="var\nvalue: 4.00\ngrad: 5.00"];"#,
        "    node3 -> node4;",
        "    node2 -> node4;",
        "    node0 -> node3;",
        "    node1 -> node3;",
    ]
    .into_iter()
    .collect();
    assert_eq!(statements, expected);
}

#[test]
fn shared_node_is_emitted_once() {
    let graph = Graph::new();
    let x = graph.leaf(1.);
    let y = (x * x).exp() + x;

    let text = y.dot_builder().show_values(false).to_dot_string().unwrap();
    let node_statements = text.lines().filter(|l| l.contains("[label=")).count();
    let edges = text.lines().filter(|l| l.contains("->")).count();
    assert_eq!(node_statements, 4);
    // x -> x*x twice, x*x -> exp, exp -> y, x -> y
    assert_eq!(edges, 5);
    assert!(text.contains(r#"    node0 [label="var"];"#));
}

#[test]
fn export_is_stable() {
    let graph = Graph::new();
    let x = graph.leaf(0.5);
    let w = graph.leaf(-1.);
    let z = x * w + x;
    let p = z.exp().normalize(&[x.exp(), w.exp()]).unwrap();
    p.eval().unwrap();
    p.backprop().unwrap();

    let first = p.dot_builder().to_dot_string().unwrap();
    let second = p.dot_builder().to_dot_string().unwrap();
    assert_eq!(first, second);
    assert!(first.contains("softmax"));

    for id in p.order().unwrap() {
        assert_eq!(graph.mark(id).unwrap(), Mark::Unvisited);
    }
}

#[test]
fn highlight_and_name() {
    let graph = Graph::new();
    let a = graph.leaf(1.);
    let b = a.exp();
    let text = b
        .dot_builder()
        .name("G")
        .highlights(a.id())
        .to_dot_string()
        .unwrap();
    assert!(text.starts_with("digraph G {"));
    assert!(text.contains("node0 [label=\"var\\nvalue: 1.00\\ngrad: 0.00\", style=filled"));
}
