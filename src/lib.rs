//! Pokegrid - a filterable PokeAPI catalog built on tui-dispatch
//!
//! The library holds the data-aggregation core (gateway, resolvers, query
//! engine, detail aggregator) and the store pieces (state, actions, reducer)
//! so they can be exercised without a terminal.

pub mod action;
pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod detail;
pub mod effect;
pub mod error;
pub mod filters;
pub mod query;
pub mod reducer;
pub mod resolver;
pub mod state;
