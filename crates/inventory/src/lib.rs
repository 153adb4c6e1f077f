//! Inventory reservation for the order engine.
//!
//! A multi-item reservation has no native multi-record transaction behind
//! it: each (product, size) variant is its own atomically-updatable record.
//! The engine therefore runs the reservation as a saga: ordered
//! compare-and-decrements, with compensating increments applied to every
//! already-decremented variant when a later item fails.
//!
//! Reservation aborts and rolls back on the first failure; restoration is
//! best-effort and keeps going past individual failures, because it runs
//! inside a cancellation that must free as much stock as it can.

pub mod error;
pub mod reservation;

pub use error::{InventoryError, Result};
pub use reservation::{
    ReservationEngine, ReserveReceipt, RestoreFailure, RestoreReport, Shortage, StockRequest,
};
