//! Types for authentication and profile management

use rentdesk_session::CredentialPair;
use rentdesk_validation::{
    validate_confirm_password, validate_date, validate_email, validate_name, validate_password,
    validate_phone, validate_required, ValidationErrors,
};
use serde::{Deserialize, Serialize};

use crate::form::{FormData, Upload};

/// User profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Date of birth, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    /// URL of the profile picture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Login credentials
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Login only checks presence; password rules apply at signup
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("email", validate_email(&self.email))
            .check("password", validate_required(&self.password, "Password"));
        errors.into_result()
    }
}

/// Sign-up payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignupData {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
}

impl SignupData {
    /// Validate the form; `confirm_password` is the second password entry
    pub fn validate(&self, confirm_password: &str) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("first_name", validate_name(&self.first_name, "First name"))
            .check("last_name", validate_name(&self.last_name, "Last name"))
            .check("email", validate_email(&self.email))
            .check("password", validate_password(&self.password))
            .check(
                "confirm_password",
                validate_confirm_password(&self.password, confirm_password),
            )
            .check("phone", validate_phone(self.phone.as_deref().unwrap_or("")))
            .check("dob", validate_date(self.dob.as_deref().unwrap_or("")));
        errors.into_result()
    }
}

/// Token pair returned by the login endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
}

impl From<&TokenResponse> for CredentialPair {
    fn from(tokens: &TokenResponse) -> Self {
        CredentialPair::new(tokens.access.clone(), tokens.refresh.clone())
    }
}

/// Response of sign-up and profile edits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordData {
    pub email: String,
}

impl ForgotPasswordData {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("email", validate_email(&self.email));
        errors.into_result()
    }
}

/// The API hands the reset token back directly instead of mailing it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub reset_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordData {
    pub email: String,
    pub new_password: String,
    pub reset_token: String,
}

impl ResetPasswordData {
    pub fn validate(&self, confirm_password: &str) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors
            .check("email", validate_email(&self.email))
            .check("reset_token", validate_required(&self.reset_token, "Reset token"))
            .check("new_password", validate_password(&self.new_password))
            .check(
                "confirm_password",
                validate_confirm_password(&self.new_password, confirm_password),
            );
        errors.into_result()
    }
}

/// Plain `{"message": ...}` response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Profile changes; only the fields that are set are sent
#[derive(Debug, Clone, Default)]
pub struct EditProfileData {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub dob: Option<String>,
    pub profile_image: Option<Upload>,
}

impl EditProfileData {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(first_name) = &self.first_name {
            errors.check("first_name", validate_name(first_name, "First name"));
        }
        if let Some(last_name) = &self.last_name {
            errors.check("last_name", validate_name(last_name, "Last name"));
        }
        if let Some(phone) = &self.phone {
            errors.check("phone", validate_phone(phone));
        }
        if let Some(dob) = &self.dob {
            errors.check("dob", validate_date(dob));
        }
        errors.into_result()
    }

    pub(crate) fn to_form(&self) -> FormData {
        FormData::new()
            .opt_text("first_name", self.first_name.as_deref())
            .opt_text("last_name", self.last_name.as_deref())
            .opt_text("phone", self.phone.as_deref())
            .opt_text("address", self.address.as_deref())
            .opt_text("dob", self.dob.as_deref())
            .opt_file("profile_image", self.profile_image.as_ref())
    }
}
