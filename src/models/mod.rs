pub mod alert;
pub mod connectivity;
pub mod contact;
pub mod device;
pub mod location;
pub mod user;

pub use alert::{Alert, AlertMechanism, AlertPolicy, AlertStatus, AlertType, NewAlert};
pub use connectivity::{
    CellularSignalReading, ConnectivitySample, ConnectivityType, NewCellularSignalReading,
    NewConnectivitySample,
};
pub use contact::{AlertModeConfig, ContactType, EmergencyContact};
pub use device::Device;
pub use location::Location;
pub use user::{Identity, Role};
