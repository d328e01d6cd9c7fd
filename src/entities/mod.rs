//! SeaORM entities, one module per table.
//!
//! Orders own their items and tracking rows; roles reach permissions and menus
//! through the two soft-deletable join tables. Every table except `users` and
//! `order_tracking` carries `is_active`/`is_deleted` flags and audit columns.

/// Sender and receiver addresses
pub mod address_book;
/// Drivers
pub mod driver;
/// Navigation menu entries
pub mod menu;
/// Role to menu links
pub mod menu_privilege;
/// Shipment orders
pub mod order;
/// Boxes within an order
pub mod order_item;
/// Append-only order history
pub mod order_tracking;
/// Named permissions
pub mod permission;
/// Roles
pub mod role;
/// Role to permission links
pub mod role_permission;
/// Shipment status lookup
pub mod shipment_status;
/// Users
pub mod user;
/// Fleet vehicles
pub mod vehicle;

// Entity and model aliases used across core
pub use address_book::{Entity as AddressBook, Model as AddressBookModel};
pub use driver::{Entity as Driver, Model as DriverModel};
pub use menu::{Entity as Menu, Model as MenuModel};
pub use menu_privilege::{Entity as MenuPrivilege, Model as MenuPrivilegeModel};
pub use order::{DimensionType, Entity as Order, Model as OrderModel, PaymentType};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use order_tracking::{Entity as OrderTracking, Model as OrderTrackingModel, TrackingEvent};
pub use permission::{Entity as Permission, Model as PermissionModel};
pub use role::{Entity as Role, Model as RoleModel};
pub use role_permission::{Entity as RolePermission, Model as RolePermissionModel};
pub use shipment_status::{Entity as ShipmentStatus, Model as ShipmentStatusModel};
pub use user::{Entity as User, Model as UserModel};
pub use vehicle::{Entity as Vehicle, Model as VehicleModel, VehicleType};
