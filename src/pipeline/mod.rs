//! Pipeline stages for paystub-to-CSV processing.
//!
//! Each submodule implements exactly one transformation step and is tested
//! on its own. Data flows strictly forward; no stage reaches back into an
//! earlier one.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ classify ──▶ parse ──▶ categorize ──▶ validate ──▶ assemble
//! (path)    (pdfium)    (header)     (items)   (categories)   (balance)    (record)
//! ```
//!
//! 1. [`input`]: validate paths, expand directories
//! 2. [`extract`]: page text via pdfium, serialised on a process-wide
//!    lock; lines cleaned by [`normalize`]
//! 3. [`classify`]: regular vs. vest, pay date, period, advice number
//! 4. [`parse`]: rule-table scan into typed line items and stated totals
//! 5. [`categorize`]: label → category/account, sign normalisation
//! 6. [`validate`]: gross/net/deduction arithmetic
//! 7. [`assemble`]: ordered output rows

pub mod assemble;
pub mod categorize;
pub mod classify;
pub mod extract;
pub mod input;
pub mod normalize;
pub mod parse;
pub mod validate;
