//! Payslip Engine
//!
//! This crate turns raw user-entered payroll numbers into a finished payslip.
//! It provides a spreadsheet-style formula evaluator with recalculation,
//! a progressive income tax and social contribution calculator configured
//! with Luxembourg rate tables, and a label-driven matcher that decides
//! which computed value fills which template field.

#![warn(missing_docs)]

pub mod api;
pub mod binding;
pub mod calculation;
pub mod config;
pub mod error;
pub mod formula;
pub mod models;
