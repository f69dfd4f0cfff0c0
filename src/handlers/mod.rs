// Public (no auth) → Protected (JWT auth, principal in extensions)
pub mod protected;
pub mod public;
