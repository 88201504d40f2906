//! Building blocks shared by the Apple and Google wallets.

pub mod object;
pub mod util;
