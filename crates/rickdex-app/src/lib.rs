// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod debounce;
pub mod fetch;
pub mod filter;
pub mod location;
pub mod model;
pub mod query;
pub mod state;

pub use debounce::*;
pub use fetch::*;
pub use filter::*;
pub use location::*;
pub use model::*;
pub use query::*;
pub use state::*;
