pub mod usecases;
pub mod voltxt_gateway;
