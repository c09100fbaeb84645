use crate::model::function::Function;
use crate::model::graph::Graph;
use crate::model::hist1d::Hist1D;

/// Closed set of objects the comparator utilities know formulas for.
#[derive(Debug, Clone, PartialEq)]
pub enum Observable {
    Binned(Hist1D),
    /// Graph with symmetric errors.
    Graph(Graph),
    AsymmGraph(Graph),
    Function(Function),
}

impl Observable {
    pub fn kind(&self) -> &'static str {
        match self {
            Observable::Binned(_) => "binned spectrum",
            Observable::Graph(_) => "graph",
            Observable::AsymmGraph(_) => "graph with asymmetric errors",
            Observable::Function(_) => "function",
        }
    }
}
