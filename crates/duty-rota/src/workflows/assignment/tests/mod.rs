mod common;
mod fairness;
mod routing;
