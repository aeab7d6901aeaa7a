use uuid::Uuid;

/// Returns a fresh random (v4) UUID.
pub fn new_uuid() -> Uuid {
    Uuid::new_v4()
}
