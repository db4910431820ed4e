//! Two paths from the leaf `a` meet again at the output, so both of their
//! contributions land in `a`'s gradient.

use tapegrad::Graph;

fn main() {
    env_logger::init();

    let graph = Graph::new();
    let a = graph.leaf(1.);
    let b = graph.leaf(3.);
    let c = graph.leaf(5.);
    let ab = a + b;
    let ac = a + c;
    let abac = ab + ac;

    println!("abac: {}", abac.eval().unwrap());
    abac.backprop().unwrap();
    println!("a: {}", a.grad().unwrap());
    println!("b: {}", b.grad().unwrap());
    println!("c: {}", c.grad().unwrap());
    abac.dot_builder()
        .highlights(a.id())
        .dot(&mut std::io::stdout())
        .unwrap();
}
