//! Types for room management

use rentdesk_validation::{validate_amount, validate_required, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::form::{FormData, Upload};

/// Occupancy status of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Available,
    Occupied,
    Maintenance,
    Reserved,
}

impl RoomStatus {
    /// Every status, in display order
    pub const ALL: [RoomStatus; 4] = [
        RoomStatus::Available,
        RoomStatus::Occupied,
        RoomStatus::Maintenance,
        RoomStatus::Reserved,
    ];

    /// Wire value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Maintenance => "maintenance",
            Self::Reserved => "reserved",
        }
    }

    /// Human-readable label for status pickers
    pub fn label(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Occupied => "Occupied",
            Self::Maintenance => "Under Maintenance",
            Self::Reserved => "Reserved",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::general(format!("Unknown room status: {}", s)))
    }
}

/// A room as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    /// Owner's user id
    pub user: i64,
    pub room_number: String,
    pub floor: i32,
    pub room_type: Option<String>,
    /// Decimal string
    pub size: Option<String>,
    /// Decimal string
    pub base_rent_amount: String,
    /// Decimal string
    pub base_security_deposit_amount: String,
    pub description: Option<String>,
    pub amenities: Option<String>,
    /// Image URL
    pub image: Option<String>,
    pub status: RoomStatus,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields of a new room
#[derive(Debug, Clone, PartialEq)]
pub struct RoomFormData {
    pub room_number: String,
    pub floor: i32,
    pub room_type: Option<String>,
    pub size: Option<String>,
    pub base_rent_amount: String,
    pub base_security_deposit_amount: String,
    pub description: Option<String>,
    pub amenities: Option<String>,
    pub image: Option<Upload>,
    pub status: RoomStatus,
    pub is_active: bool,
}

impl Default for RoomFormData {
    fn default() -> Self {
        Self {
            room_number: String::new(),
            floor: 1,
            room_type: None,
            size: None,
            base_rent_amount: String::new(),
            base_security_deposit_amount: String::new(),
            description: None,
            amenities: None,
            image: None,
            status: RoomStatus::Available,
            is_active: true,
        }
    }
}

impl RoomFormData {
    /// Pre-fill a form from an existing room, for editing. The image is
    /// left empty; the current one stays unless a new upload is set.
    pub fn from_room(room: &Room) -> Self {
        Self {
            room_number: room.room_number.clone(),
            floor: room.floor,
            room_type: room.room_type.clone(),
            size: room.size.clone(),
            base_rent_amount: room.base_rent_amount.clone(),
            base_security_deposit_amount: room.base_security_deposit_amount.clone(),
            description: room.description.clone(),
            amenities: room.amenities.clone(),
            image: None,
            status: room.status,
            is_active: room.is_active,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(
            "room_number",
            validate_required(&self.room_number, "Room number"),
        );
        if self.floor < 0 {
            errors.add("floor", "Floor cannot be negative");
        }
        errors
            .check(
                "size",
                validate_amount(self.size.as_deref().unwrap_or(""), "Size", false),
            )
            .check(
                "base_rent_amount",
                validate_amount(&self.base_rent_amount, "Base rent amount", true),
            )
            .check(
                "base_security_deposit_amount",
                validate_amount(
                    &self.base_security_deposit_amount,
                    "Security deposit amount",
                    true,
                ),
            );
        errors.into_result()
    }

    pub(crate) fn to_form(&self) -> FormData {
        FormData::new()
            .text("room_number", &self.room_number)
            .text("floor", self.floor)
            .opt_text("room_type", self.room_type.as_deref())
            .opt_text("size", self.size.as_deref())
            .text("base_rent_amount", &self.base_rent_amount)
            .text(
                "base_security_deposit_amount",
                &self.base_security_deposit_amount,
            )
            .opt_text("description", self.description.as_deref())
            .opt_text("amenities", self.amenities.as_deref())
            .opt_file("image", self.image.as_ref())
            .text("status", self.status)
            .text("is_active", self.is_active)
    }
}

/// Partial room update; fields left `None` keep their current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomUpdate {
    pub room_number: Option<String>,
    pub floor: Option<i32>,
    pub room_type: Option<String>,
    pub size: Option<String>,
    pub base_rent_amount: Option<String>,
    pub base_security_deposit_amount: Option<String>,
    pub description: Option<String>,
    pub amenities: Option<String>,
    pub image: Option<Upload>,
    pub status: Option<RoomStatus>,
    pub is_active: Option<bool>,
}

impl RoomUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only change the status
    pub fn status(status: RoomStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether no field is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(room_number) = &self.room_number {
            errors.check("room_number", validate_required(room_number, "Room number"));
        }
        if self.floor.is_some_and(|floor| floor < 0) {
            errors.add("floor", "Floor cannot be negative");
        }
        if let Some(size) = &self.size {
            errors.check("size", validate_amount(size, "Size", false));
        }
        if let Some(rent) = &self.base_rent_amount {
            errors.check(
                "base_rent_amount",
                validate_amount(rent, "Base rent amount", true),
            );
        }
        if let Some(deposit) = &self.base_security_deposit_amount {
            errors.check(
                "base_security_deposit_amount",
                validate_amount(deposit, "Security deposit amount", true),
            );
        }
        errors.into_result()
    }

    pub(crate) fn to_form(&self) -> FormData {
        FormData::new()
            .opt_text("room_number", self.room_number.as_deref())
            .opt_text("floor", self.floor)
            .opt_text("room_type", self.room_type.as_deref())
            .opt_text("size", self.size.as_deref())
            .opt_text("base_rent_amount", self.base_rent_amount.as_deref())
            .opt_text(
                "base_security_deposit_amount",
                self.base_security_deposit_amount.as_deref(),
            )
            .opt_text("description", self.description.as_deref())
            .opt_text("amenities", self.amenities.as_deref())
            .opt_file("image", self.image.as_ref())
            .opt_text("status", self.status)
            .opt_text("is_active", self.is_active)
    }
}

impl From<RoomFormData> for RoomUpdate {
    fn from(form: RoomFormData) -> Self {
        Self {
            room_number: Some(form.room_number),
            floor: Some(form.floor),
            room_type: form.room_type,
            size: form.size,
            base_rent_amount: Some(form.base_rent_amount),
            base_security_deposit_amount: Some(form.base_security_deposit_amount),
            description: form.description,
            amenities: form.amenities,
            image: form.image,
            status: Some(form.status),
            is_active: Some(form.is_active),
        }
    }
}
