mod invoice;
mod payment_record;
mod refund;
mod user;

pub use invoice::*;
pub use payment_record::*;
pub use refund::*;
pub use user::*;
