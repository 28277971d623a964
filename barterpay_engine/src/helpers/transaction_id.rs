use chrono::Utc;
use rand::Rng;

/// Generates a fresh outbound transaction id of the form `txn_<8 hex secs><5 hex micros>.<8 random digits>`.
///
/// Ids are unique with overwhelming probability, but not guaranteed to be. The order store rejects a collision when
/// the id is bound, and the caller can simply generate another one.
pub fn generate_transaction_id() -> String {
    let now = Utc::now();
    let secs = now.timestamp();
    let micros = now.timestamp_subsec_micros();
    let salt = rand::thread_rng().gen_range(0..100_000_000u32);
    format!("txn_{secs:08x}{micros:05x}.{salt:08}")
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn transaction_id_format() {
        let id = generate_transaction_id();
        let (head, salt) = id.split_once('.').expect("no separator");
        assert!(head.starts_with("txn_"));
        assert_eq!(head.len(), 4 + 13);
        assert!(head[4..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(salt.len(), 8);
        assert!(salt.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn transaction_ids_do_not_repeat() {
        let ids = (0..1000).map(|_| generate_transaction_id()).collect::<HashSet<_>>();
        assert_eq!(ids.len(), 1000);
    }
}
