use uuid::Uuid;

/// A record that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

/// True when `user_id` owns `resource`.
pub fn owns<R: Owned + ?Sized>(resource: &R, user_id: Uuid) -> bool {
    resource.owner_id() == user_id
}

/// Like [`owns`], but treats a missing resource as not owned.
///
/// Returns the resource back on success so callers can keep working with it.
pub fn ensure_owner<R: Owned>(resource: Option<R>, user_id: Uuid) -> Option<R> {
    resource.filter(|resource| owns(resource, user_id))
}
