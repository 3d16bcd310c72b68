//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (TransactionRecord, UnlockCode, Enrollment)
//! - Domain value objects (Amount, PaymentMethod, CodeDigest, ...)
//! - Domain services (code generation, normalization, digest)
//! - Repository traits and outbound ports (interfaces)

pub mod audit;
pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
