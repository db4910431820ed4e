//! Softmax regression of three classes on the plane, trained by stochastic
//! gradient descent.

use rand::{rngs::StdRng, Rng, SeedableRng};
use tapegrad::{Graph, NodeId, Var};

const FEATURES: usize = 2;
const CLASSES: usize = 3;
const RATE: f64 = 0.05;
const EPOCHS: usize = 300;

struct Model<'a> {
    inputs: Vec<Var<'a>>,
    params: Vec<Var<'a>>,
    outputs: Vec<Var<'a>>,
    order: Vec<NodeId>,
}

fn build_model<'a>(graph: &'a Graph, rng: &mut impl Rng) -> tapegrad::Result<Model<'a>> {
    let xavier = (2. / (FEATURES + CLASSES) as f64).sqrt();
    let inputs: Vec<_> = (0..FEATURES).map(|_| graph.leaf(0.)).collect();

    let mut params = vec![];
    let mut exps = vec![];
    for _ in 0..CLASSES {
        let bias = graph.leaf(rng.gen_range(-0.1..0.1));
        params.push(bias);
        let mut z = bias;
        for x in &inputs {
            let w = graph.leaf(rng.gen_range(-1.0..1.0) * xavier);
            params.push(w);
            z = z + *x * w;
        }
        exps.push(z.exp());
    }

    // Each output puts its own class in the numerator.
    let mut outputs = vec![];
    for (i, numerator) in exps.iter().enumerate() {
        let others: Vec<_> = exps
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, e)| *e)
            .collect();
        outputs.push(numerator.normalize(&others)?);
    }

    let roots: Vec<_> = outputs.iter().map(Var::id).collect();
    let order = graph.order_many(&roots)?;
    Ok(Model {
        inputs,
        params,
        outputs,
        order,
    })
}

fn main() {
    env_logger::init();

    let samples: Vec<([f64; FEATURES], usize)> = vec![
        ([-2.0, 0.1], 0),
        ([-1.6, -0.4], 0),
        ([-2.4, 0.5], 0),
        ([-1.8, -0.2], 0),
        ([2.1, -0.3], 1),
        ([1.7, 0.2], 1),
        ([2.5, 0.4], 1),
        ([1.9, -0.6], 1),
        ([0.2, 2.4], 2),
        ([-0.3, 2.0], 2),
        ([0.4, 2.8], 2),
        ([0.0, 2.2], 2),
    ];

    let graph = Graph::new();
    let mut rng = StdRng::seed_from_u64(42);
    let model = build_model(&graph, &mut rng).unwrap();

    let predict = |features: &[f64; FEATURES]| {
        for (input, value) in model.inputs.iter().zip(features) {
            input.set(*value).unwrap();
        }
        graph.evaluate_forward(&model.order).unwrap();
        let probs: Vec<_> = model.outputs.iter().map(|o| o.value().unwrap()).collect();
        let best = (0..CLASSES)
            .max_by(|a, b| probs[*a].total_cmp(&probs[*b]))
            .unwrap();
        (probs, best)
    };

    for epoch in 0..EPOCHS {
        let mut total_loss = 0.;
        let mut correct = 0;
        for (features, label) in &samples {
            let (probs, best) = predict(features);
            let p = probs[*label];
            total_loss -= p.ln();
            if best == *label {
                correct += 1;
            }

            // d(-ln p)/dp seeds the output of the true class.
            graph.clear_grads();
            model.outputs[*label].set_grad(-1. / p).unwrap();
            graph.run_backward(&model.order).unwrap();
            for param in &model.params {
                param
                    .set(param.value().unwrap() - RATE * param.grad().unwrap())
                    .unwrap();
            }
        }
        if epoch % 50 == 0 || epoch == EPOCHS - 1 {
            println!(
                "epoch {epoch}: loss = {:.4}, accuracy = {:.2}%",
                total_loss / samples.len() as f64,
                100. * correct as f64 / samples.len() as f64
            );
        }
    }

    let mut file = std::io::BufWriter::new(
        std::fs::File::create("softmax_regression.dot").unwrap(),
    );
    model.outputs[0]
        .dot_builder()
        .dot(&mut file)
        .unwrap();
    println!("graph of the first output written to softmax_regression.dot");
}
