//! One module per [`kdd_core::KDDKind`], each exporting a single
//! `*Extractor` that implements [`crate::extractor::Extractor`].

pub mod adr;
pub mod business_policy;
pub mod business_rule;
pub mod command;
pub mod cross_policy;
pub mod entity;
pub mod event;
pub mod objective;
pub mod prd;
pub mod process;
pub mod query;
pub mod requirement;
pub mod ui_component;
pub mod ui_view;
pub mod use_case;
