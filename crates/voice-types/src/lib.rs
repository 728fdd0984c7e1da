//! Wire types shared between the voice gateway and the call client.

mod region;
mod token;

pub use region::{Edge, Region, UnknownRegion};
pub use token::{ErrorBody, TokenResponse};
