mod accounts;
mod chain;
mod indexing;
mod node_flow;
mod pending;
mod rewards;
