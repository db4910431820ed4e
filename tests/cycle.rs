use tapegrad::{Graph, GraphError, Mark};

#[test]
fn diamond() {
    let graph = Graph::new();
    let a = graph.leaf(1.);
    let b = graph.leaf(3.);
    let c = graph.leaf(5.);
    let ab = a + b;
    let ac = a + c;
    let abac = ab + ac;

    assert_eq!(abac.eval().unwrap(), 10.);
    abac.backprop().unwrap();
    assert_eq!(a.grad().unwrap(), 2.);
    assert_eq!(b.grad().unwrap(), 1.);
    assert_eq!(c.grad().unwrap(), 1.);
}

#[test]
fn diamond_is_ordered_once() {
    let graph = Graph::new();
    let a = graph.leaf(1.);
    let b = graph.leaf(3.);
    let c = graph.leaf(5.);
    let abac = (a + b) + (a + c);

    let order = abac.order().unwrap();
    assert_eq!(order.len(), 6);
    assert_eq!(order.iter().filter(|id| **id == a.id()).count(), 1);
    assert_eq!(*order.last().unwrap(), abac.id());
}

#[test]
fn self_loop() {
    let graph = Graph::new();
    let x = graph.create_leaf(1.);
    let e = graph.create_exponential(x).unwrap();
    graph.replace_inputs(e, &[e]).unwrap();

    match graph.order(e) {
        Err(GraphError::CycleDetected { node }) => assert_eq!(node, e),
        res => panic!("expected a cycle, got {res:?}"),
    }
}

#[test]
fn indirect_cycle() {
    let graph = Graph::new();
    let a = graph.create_leaf(1.);
    let b = graph.create_leaf(2.);
    let p = graph.create_add(a, b).unwrap();
    let q = graph.create_multiply(p, b).unwrap();
    let r = graph.create_exponential(q).unwrap();
    // p now consumes r, which depends on p.
    graph.replace_inputs(p, &[a, r]).unwrap();

    assert!(matches!(
        graph.order(r),
        Err(GraphError::CycleDetected { .. })
    ));
    assert!(matches!(
        graph.evaluate_recursive(r),
        Err(GraphError::CycleDetected { .. })
    ));

    // A failed traversal leaves no marks behind.
    for id in [a, b, p, q, r] {
        assert_eq!(graph.mark(id).unwrap(), Mark::Unvisited);
    }

    // Breaking the cycle makes the graph usable again.
    graph.replace_inputs(p, &[a, b]).unwrap();
    assert_eq!(graph.order(r).unwrap(), vec![a, b, p, q, r]);
}

#[test]
fn replace_inputs_checks_arity() {
    let graph = Graph::new();
    let a = graph.create_leaf(1.);
    let e = graph.create_exponential(a).unwrap();
    assert!(matches!(
        graph.replace_inputs(e, &[a, a]),
        Err(GraphError::ArityMismatch { actual: 2, .. })
    ));
    assert_eq!(graph.inputs(e).unwrap(), vec![a]);
}
