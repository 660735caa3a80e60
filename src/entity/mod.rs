pub mod audit_logs;
pub mod bookings;
pub mod reviews;
pub mod rides;
pub mod users;
pub mod vehicles;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use reviews::Entity as Reviews;
pub use rides::Entity as Rides;
pub use users::Entity as Users;
pub use vehicles::Entity as Vehicles;
