//! RMSprop optimizer over candle variables.
//!
//! ```text
//! ms = rho * ms + (1 - rho) * g^2
//! w  = w - lr * g / (sqrt(ms) + eps)
//! ```

use candle_core::backprop::GradStore;
use candle_core::{Result, Var};
use candle_nn::Optimizer;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamsRmsProp {
    pub lr: f64,
    pub rho: f64,
    pub eps: f64,
}

impl Default for ParamsRmsProp {
    fn default() -> Self {
        Self {
            lr: 0.001,
            rho: 0.9,
            eps: 1e-7,
        }
    }
}

#[derive(Debug)]
struct VarRmsProp {
    var: Var,
    mean_square: Var,
}

#[derive(Debug)]
pub struct RmsProp {
    vars: Vec<VarRmsProp>,
    params: ParamsRmsProp,
}

impl Optimizer for RmsProp {
    type Config = ParamsRmsProp;

    fn new(vars: Vec<Var>, params: ParamsRmsProp) -> Result<Self> {
        let vars = vars
            .into_iter()
            .filter(|var| var.dtype().is_float())
            .map(|var| {
                let mean_square = Var::zeros(var.shape(), var.dtype(), var.device())?;
                Ok(VarRmsProp { var, mean_square })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { vars, params })
    }

    fn step(&mut self, grads: &GradStore) -> Result<()> {
        let ParamsRmsProp { lr, rho, eps } = self.params;
        for v in &self.vars {
            if let Some(g) = grads.get(&v.var) {
                let mean_square = v
                    .mean_square
                    .affine(rho, 0.0)?
                    .add(&g.sqr()?.affine(1.0 - rho, 0.0)?)?;
                let denom = mean_square.sqrt()?.affine(1.0, eps)?;
                let update = g.div(&denom)?.affine(lr, 0.0)?;
                v.var.set(&v.var.sub(&update)?)?;
                v.mean_square.set(&mean_square)?;
            }
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.params.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.params.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn minimises_a_quadratic() {
        let w = Var::new(&[3.0f32, -2.0], &Device::Cpu).unwrap();
        let params = ParamsRmsProp {
            lr: 0.05,
            ..ParamsRmsProp::default()
        };
        let mut opt = RmsProp::new(vec![w.clone()], params).unwrap();

        for _ in 0..300 {
            let loss = w.as_tensor().sqr().unwrap().sum_all().unwrap();
            opt.backward_step(&loss).unwrap();
        }

        let values = w.as_tensor().to_vec1::<f32>().unwrap();
        assert!(values.iter().all(|v| v.abs() < 0.1), "{:?}", values);
    }

    #[test]
    fn first_step_moves_by_lr_over_sqrt_one_minus_rho() {
        let w = Var::new(&[1.0f32], &Device::Cpu).unwrap();
        let mut opt = RmsProp::new(vec![w.clone()], ParamsRmsProp::default()).unwrap();

        // d/dw (2w) = 2, ms = 0.1 * 4 = 0.4, step = 0.001 * 2 / sqrt(0.4)
        let loss = w.as_tensor().affine(2.0, 0.0).unwrap().sum_all().unwrap();
        opt.backward_step(&loss).unwrap();

        let expected = 1.0 - 0.001 * 2.0 / (0.4f64.sqrt() + 1e-7);
        let got = w.as_tensor().to_vec1::<f32>().unwrap()[0] as f64;
        assert!((got - expected).abs() < 1e-6);
    }

    #[test]
    fn learning_rate_is_adjustable() {
        let mut opt = RmsProp::new(vec![], ParamsRmsProp::default()).unwrap();
        assert_eq!(opt.learning_rate(), 0.001);
        opt.set_learning_rate(0.01);
        assert_eq!(opt.learning_rate(), 0.01);
    }
}
