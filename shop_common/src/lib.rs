mod pesewas;

pub mod helpers;
pub mod op;
mod secret;

pub use pesewas::{Pesewas, PesewasConversionError, STORE_CURRENCY_CODE};
pub use secret::Secret;
