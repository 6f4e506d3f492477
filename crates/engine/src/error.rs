// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use deespec_core::error::DeespecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Execution(#[from] DeespecError),
    #[error("an execution for item {0} is already active")]
    AlreadyActive(String),
}
