// Token identifiers.
//
// Every minted token carries a `jti` so that two tokens issued for the same
// principal within the same second still differ, and so do their stored
// hashes. UUIDv7 keeps the identifiers roughly ordered by issue time.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a fresh token identifier.
pub fn token_id() -> String {
    uuidv7().simple().to_string()
}
