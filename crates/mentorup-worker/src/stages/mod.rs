//! The four independent stage workers (spec §4.5), one module apiece.

pub mod transcode_mobile;
pub mod transcode_web;
pub mod transcribe;
pub mod trim_upload;
