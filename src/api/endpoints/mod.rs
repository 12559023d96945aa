pub mod ai;
pub mod clinics;
pub mod contracts;
pub mod drafting;
pub mod exports;
pub mod health;
pub mod patients;
pub mod permissions;
pub mod plannings;
pub mod roles;
pub mod treatments;
pub mod users;
