// handlers/protected - routes behind jwt_auth_middleware; the `Principal` is in extensions

pub mod data; // /data, /data/:id - owned data items
pub mod users; // /users, /me
