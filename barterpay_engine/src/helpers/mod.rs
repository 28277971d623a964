mod transaction_id;

pub use transaction_id::generate_transaction_id;
