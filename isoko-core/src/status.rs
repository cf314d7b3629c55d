use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declares a persisted enum together with its canonical storage string.
macro_rules! storage_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        concat!("unknown ", stringify!($name), ": {}"),
                        other
                    )),
                }
            }
        }
    };
}

storage_enum! {
    /// How an item is measured.
    pub enum MeasurementKind {
        Weight => "WEIGHT",
        Volume => "VOLUME",
    }
}

storage_enum! {
    /// Base unit that quantities and unit prices refer to.
    pub enum BaseUnit {
        Kg => "KG",
        Litre => "LITRE",
    }
}

storage_enum! {
    /// Role of a reference contact record.
    pub enum ContactRole {
        Supplier => "SUPPLIER",
        Customer => "CUSTOMER",
        ExternalOwner => "EXTERNAL_OWNER",
    }
}

storage_enum! {
    /// Settlement of money we owe or are owed under a purchase or rental contract.
    pub enum SettlementStatus {
        Pending => "PENDING",
        Partial => "PARTIAL",
        FullySettled => "FULLY_SETTLED",
    }
}

storage_enum! {
    /// Settlement of money a customer owes us for a sale.
    pub enum ReceiptStatus {
        Pending => "PENDING",
        Partial => "PARTIAL",
        FullyReceived => "FULLY_RECEIVED",
    }
}

storage_enum! {
    /// Status shown to operators; `Delayed` exists only at read time.
    pub enum DisplayStatus {
        Pending => "PENDING",
        Partial => "PARTIAL",
        FullySettled => "FULLY_SETTLED",
        FullyReceived => "FULLY_RECEIVED",
        Delayed => "DELAYED",
    }
}

storage_enum! {
    /// Which ledger record a grocery payment settles.
    pub enum PaymentReference {
        Purchase => "PURCHASE",
        Sale => "SALE",
    }
}

storage_enum! {
    pub enum PaymentMode {
        Cash => "CASH",
        MobileMoney => "MOBILE_MONEY",
        BankTransfer => "BANK_TRANSFER",
        Cheque => "CHEQUE",
        Other => "OTHER",
    }
}

storage_enum! {
    pub enum VehicleType {
        Truck => "TRUCK",
        Machine => "MACHINE",
    }
}

storage_enum! {
    /// Basis on which a vehicle's rate is quoted.
    pub enum RentalType {
        Day => "DAY",
        Hour => "HOUR",
        Month => "MONTH",
    }
}

storage_enum! {
    pub enum OwnershipType {
        Own => "OWN",
        External => "EXTERNAL",
    }
}

storage_enum! {
    /// Operational state of a fleet vehicle.
    pub enum VehicleStatus {
        Available => "AVAILABLE",
        RentedOut => "RENTED_OUT",
        RentedIn => "RENTED_IN",
        Maintenance => "MAINTENANCE",
        Offline => "OFFLINE",
    }
}

storage_enum! {
    /// `Outgoing` rents our vehicle to a customer, `Incoming` rents an external owner's vehicle.
    pub enum RentalDirection {
        Outgoing => "OUTGOING",
        Incoming => "INCOMING",
    }
}

storage_enum! {
    /// Lifecycle of a rental contract. `Completed` and `Cancelled` are terminal.
    pub enum ContractStatus {
        Active => "ACTIVE",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

impl ContractStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ContractStatus::Active)
    }
}

/// Side-neutral settlement outcome produced by the settlement calculator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementState {
    Pending,
    Partial,
    Complete,
}

impl From<SettlementState> for SettlementStatus {
    fn from(value: SettlementState) -> Self {
        match value {
            SettlementState::Pending => SettlementStatus::Pending,
            SettlementState::Partial => SettlementStatus::Partial,
            SettlementState::Complete => SettlementStatus::FullySettled,
        }
    }
}

impl From<SettlementState> for ReceiptStatus {
    fn from(value: SettlementState) -> Self {
        match value {
            SettlementState::Pending => ReceiptStatus::Pending,
            SettlementState::Partial => ReceiptStatus::Partial,
            SettlementState::Complete => ReceiptStatus::FullyReceived,
        }
    }
}

impl From<SettlementStatus> for DisplayStatus {
    fn from(value: SettlementStatus) -> Self {
        match value {
            SettlementStatus::Pending => DisplayStatus::Pending,
            SettlementStatus::Partial => DisplayStatus::Partial,
            SettlementStatus::FullySettled => DisplayStatus::FullySettled,
        }
    }
}

impl From<ReceiptStatus> for DisplayStatus {
    fn from(value: ReceiptStatus) -> Self {
        match value {
            ReceiptStatus::Pending => DisplayStatus::Pending,
            ReceiptStatus::Partial => DisplayStatus::Partial,
            ReceiptStatus::FullyReceived => DisplayStatus::FullyReceived,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_strings_roundtrip_through_from_str() {
        for status in [
            VehicleStatus::Available,
            VehicleStatus::RentedOut,
            VehicleStatus::RentedIn,
            VehicleStatus::Maintenance,
            VehicleStatus::Offline,
        ] {
            assert_eq!(status.as_str().parse::<VehicleStatus>().unwrap(), status);
        }
        assert_eq!("rented_out".parse::<VehicleStatus>().unwrap(), VehicleStatus::RentedOut);
        assert!("PARKED".parse::<VehicleStatus>().is_err());
    }

    #[test]
    fn serde_uses_storage_names() {
        let json = serde_json::to_string(&ReceiptStatus::FullyReceived).unwrap();
        assert_eq!(json, "\"FULLY_RECEIVED\"");
        let mode: PaymentMode = serde_json::from_str("\"MOBILE_MONEY\"").unwrap();
        assert_eq!(mode, PaymentMode::MobileMoney);
    }

    #[test]
    fn settlement_state_maps_to_side_specific_status() {
        assert_eq!(
            SettlementStatus::from(SettlementState::Complete),
            SettlementStatus::FullySettled
        );
        assert_eq!(
            ReceiptStatus::from(SettlementState::Complete),
            ReceiptStatus::FullyReceived
        );
        assert!(ContractStatus::Cancelled.is_terminal());
        assert!(!ContractStatus::Active.is_terminal());
    }
}
