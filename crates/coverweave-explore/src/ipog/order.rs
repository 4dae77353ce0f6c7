//! Parameter orders: which parameters seed the initial array and in which
//! order the rest are added.

/// Initial parameters and the remaining ones in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedParameters {
    pub initial: Vec<usize>,
    pub remaining: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParameterOrder {
    /// The first `t` parameters, then the rest in declaration order.
    #[default]
    Default,
    /// The given parameters first, then the rest in declaration order.
    NegativityAware { involved: Vec<usize> },
}

impl ParameterOrder {
    pub fn order(&self, parameter_count: usize, strength: usize) -> OrderedParameters {
        match self {
            ParameterOrder::Default => {
                let split = strength.min(parameter_count);
                OrderedParameters {
                    initial: (0..split).collect(),
                    remaining: (split..parameter_count).collect(),
                }
            }
            ParameterOrder::NegativityAware { involved } => {
                let mut initial: Vec<usize> = involved
                    .iter()
                    .copied()
                    .filter(|&p| p < parameter_count)
                    .collect();
                initial.sort_unstable();
                initial.dedup();
                let remaining = (0..parameter_count)
                    .filter(|p| !initial.contains(p))
                    .collect();
                OrderedParameters { initial, remaining }
            }
        }
    }
}
