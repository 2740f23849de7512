// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the embedded database file | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `AUTH_SECRET` | HS256 secret for token verification | Required for production |
//! | `ALLOWED_EMAIL_DOMAIN` | Institutional email suffix accepted at sign-in | `@srmap.edu.in` |
//! | `ADMIN_ADMISSION_IDS` | Comma-separated admission numbers seeded as admins | Empty |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the data directory path.
///
/// The embedded database file (`washline.redb`) is created inside this
/// directory on first start.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default data directory when `DATA_DIR` is not set.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// File name of the embedded database inside the data directory.
pub const DATABASE_FILE: &str = "washline.redb";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the HS256 token verification secret.
///
/// When unset, the server falls back to structure-only token decoding
/// (development mode). Never deploy without this set.
pub const AUTH_SECRET_ENV: &str = "AUTH_SECRET";

/// Environment variable name for the accepted institutional email suffix.
pub const ALLOWED_DOMAIN_ENV: &str = "ALLOWED_EMAIL_DOMAIN";

/// Default institutional email suffix.
pub const DEFAULT_ALLOWED_DOMAIN: &str = "@srmap.edu.in";

/// Environment variable name for the comma-separated list of admission
/// numbers granted the admin role at startup.
///
/// The role table in the database is authoritative at request time; this
/// variable only seeds it so a fresh deployment has at least one admin.
pub const ADMIN_ADMISSION_IDS_ENV: &str = "ADMIN_ADMISSION_IDS";

/// Environment variable name selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Wash units granted to every account on first sign-in.
pub const INITIAL_WASH_BALANCE: u32 = 40;
