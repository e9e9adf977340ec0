// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! # PERFORMANCE CRITICAL MODULE
//!
//! Error constructors are called from every buffer read and every field
//! header check. They are `#[cold]` so LLVM keeps them out of the hot
//! encode/decode paths; keep the attributes when adding new ones.

use std::borrow::Cow;

use thiserror::Error;

/// Set `PROTOGRAPH_PANIC_ON_ERROR=1` at compile time to panic where an error is created.
pub const PANIC_ON_ERROR: bool = option_env!("PROTOGRAPH_PANIC_ON_ERROR").is_some();

/// Check if PROTOGRAPH_PANIC_ON_ERROR environment variable is set.
#[inline(always)]
pub const fn should_panic_on_error() -> bool {
    PANIC_ON_ERROR
}

/// Error type for protograph encoding, decoding and model configuration.
///
/// # IMPORTANT: Always Use Static Constructor Functions
///
/// **DO NOT** construct error variants directly using the enum syntax.
/// **ALWAYS** use the provided static constructor functions instead, they
/// accept anything convertible into `Cow<'static, str>` and honor the
/// `PROTOGRAPH_PANIC_ON_ERROR` debugging switch.
///
/// ```rust
/// use protograph_core::error::Error;
///
/// let err = Error::invalid_tag("field number 0");
/// let err = Error::truncated_input(10, 20, 25);
/// let err = Error::framing_error(format!("group {} closed by {}", 3, 4));
/// ```
///
/// ## Error kinds
///
/// Wire level errors abort the current top level operation:
/// [`Error::malformed_varint`], [`Error::truncated_input`],
/// [`Error::invalid_tag`], [`Error::unexpected_wire_type`],
/// [`Error::framing_error`], [`Error::invalid_data`], [`Error::invalid_ref`],
/// [`Error::unknown_enum`], [`Error::depth_exceed`] and
/// [`Error::reference_integrity`].
///
/// Model errors are raised the first time a type is used:
/// [`Error::duplicate_configuration`], [`Error::unsupported_shape`],
/// [`Error::invalid_configuration`] and [`Error::type_error`].
///
/// Errors returned by user callbacks are carried unchanged in
/// [`Error::Callback`].
///
/// ## Debug Mode: PROTOGRAPH_PANIC_ON_ERROR
///
/// ```bash
/// RUST_BACKTRACE=1 PROTOGRAPH_PANIC_ON_ERROR=1 cargo test
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A varint did not terminate within 10 bytes.
    ///
    /// Do not construct this variant directly; use [`Error::malformed_varint`] instead.
    #[error("{0}")]
    MalformedVarint(Cow<'static, str>),

    /// Fewer bytes are available than a read requires.
    ///
    /// Do not construct this variant directly; use [`Error::truncated_input`] instead.
    #[error("Truncated input: {0} + {1} > {2}")]
    TruncatedInput(usize, usize, usize),

    /// A field header decoded to an invalid field number or wire type.
    ///
    /// Do not construct this variant directly; use [`Error::invalid_tag`] instead.
    #[error("{0}")]
    InvalidTag(Cow<'static, str>),

    /// The on-wire type of a field cannot be used for the configured value.
    ///
    /// Do not construct this variant directly; use [`Error::unexpected_wire_type`] instead.
    #[error("{0}")]
    UnexpectedWireType(Cow<'static, str>),

    /// Sub-item nesting was violated.
    ///
    /// Do not construct this variant directly; use [`Error::framing_error`] instead.
    #[error("{0}")]
    FramingError(Cow<'static, str>),

    /// Two fields, callbacks or enum mappings claim the same slot.
    ///
    /// Do not construct this variant directly; use [`Error::duplicate_configuration`] instead.
    #[error("{0}")]
    DuplicateConfiguration(Cow<'static, str>),

    /// A value shape that cannot be encoded.
    ///
    /// Do not construct this variant directly; use [`Error::unsupported_shape`] instead.
    #[error("{0}")]
    UnsupportedShape(Cow<'static, str>),

    /// A reference-tracked or in-place merged object was replaced during decode.
    ///
    /// Do not construct this variant directly; use [`Error::reference_integrity`] instead.
    #[error("{0}")]
    ReferenceIntegrity(Cow<'static, str>),

    /// A type model configuration is not usable.
    ///
    /// Do not construct this variant directly; use [`Error::invalid_configuration`] instead.
    #[error("{0}")]
    InvalidConfiguration(Cow<'static, str>),

    /// A runtime type is not registered or does not match.
    ///
    /// Do not construct this variant directly; use [`Error::type_error`] instead.
    #[error("{0}")]
    TypeError(Cow<'static, str>),

    /// Invalid or corrupted data encountered.
    ///
    /// Do not construct this variant directly; use [`Error::invalid_data`] instead.
    #[error("{0}")]
    InvalidData(Cow<'static, str>),

    /// A reference key that is unknown or still being decoded.
    ///
    /// Do not construct this variant directly; use [`Error::invalid_ref`] instead.
    #[error("{0}")]
    InvalidRef(Cow<'static, str>),

    /// An enum wire value with no mapped member.
    ///
    /// Do not construct this variant directly; use [`Error::unknown_enum`] instead.
    #[error("{0}")]
    UnknownEnum(Cow<'static, str>),

    /// Maximum nesting depth exceeded.
    ///
    /// Do not construct this variant directly; use [`Error::depth_exceed`] instead.
    #[error("{0}")]
    DepthExceed(Cow<'static, str>),

    /// A value cannot be represented in the requested encoding.
    ///
    /// Do not construct this variant directly; use [`Error::encode_error`] instead.
    #[error("{0}")]
    EncodeError(Cow<'static, str>),

    /// An error returned by a lifecycle callback, unchanged.
    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

macro_rules! message_constructors {
    ($($(#[$meta:meta])* $name:ident => $variant:ident;)+) => {
        $(
            $(#[$meta])*
            #[inline(always)]
            #[cold]
            #[track_caller]
            pub fn $name<S: Into<Cow<'static, str>>>(s: S) -> Self {
                let err = Error::$variant(s.into());
                if PANIC_ON_ERROR {
                    panic!("PROTOGRAPH_PANIC_ON_ERROR: {}", err);
                }
                err
            }
        )+
    };
}

impl Error {
    /// Creates a new [`Error::TruncatedInput`] with the given bounds.
    ///
    /// # Example
    /// ```
    /// use protograph_core::error::Error;
    ///
    /// let err = Error::truncated_input(10, 20, 25);
    /// assert_eq!(err.to_string(), "Truncated input: 10 + 20 > 25");
    /// ```
    #[inline(always)]
    #[cold]
    #[track_caller]
    pub fn truncated_input(offset: usize, length: usize, capacity: usize) -> Self {
        let err = Error::TruncatedInput(offset, length, capacity);
        if PANIC_ON_ERROR {
            panic!("PROTOGRAPH_PANIC_ON_ERROR: {}", err);
        }
        err
    }

    message_constructors! {
        /// Creates a new [`Error::MalformedVarint`].
        malformed_varint => MalformedVarint;
        /// Creates a new [`Error::InvalidTag`].
        invalid_tag => InvalidTag;
        /// Creates a new [`Error::UnexpectedWireType`].
        unexpected_wire_type => UnexpectedWireType;
        /// Creates a new [`Error::FramingError`].
        framing_error => FramingError;
        /// Creates a new [`Error::DuplicateConfiguration`].
        ///
        /// # Example
        /// ```
        /// use protograph_core::error::Error;
        ///
        /// let err = Error::duplicate_configuration(format!("field {} is declared twice", 3));
        /// ```
        duplicate_configuration => DuplicateConfiguration;
        /// Creates a new [`Error::UnsupportedShape`].
        unsupported_shape => UnsupportedShape;
        /// Creates a new [`Error::ReferenceIntegrity`].
        reference_integrity => ReferenceIntegrity;
        /// Creates a new [`Error::InvalidConfiguration`].
        invalid_configuration => InvalidConfiguration;
        /// Creates a new [`Error::TypeError`].
        type_error => TypeError;
        /// Creates a new [`Error::InvalidData`].
        invalid_data => InvalidData;
        /// Creates a new [`Error::InvalidRef`].
        invalid_ref => InvalidRef;
        /// Creates a new [`Error::UnknownEnum`].
        unknown_enum => UnknownEnum;
        /// Creates a new [`Error::DepthExceed`].
        depth_exceed => DepthExceed;
        /// Creates a new [`Error::EncodeError`].
        encode_error => EncodeError;
    }

    /// Appends the Rust type name to a [`Error::TypeError`].
    ///
    /// # Example
    /// ```
    /// use protograph_core::error::Error;
    ///
    /// let err = Error::enhance_type_error::<String>(Error::type_error("Type not registered"));
    /// assert!(err.to_string().contains("alloc::string::String"));
    /// ```
    #[inline(never)]
    pub fn enhance_type_error<T: ?Sized + 'static>(err: Error) -> Error {
        if let Error::TypeError(s) = err {
            let mut msg = s.to_string();
            msg.push_str(" (type: ");
            msg.push_str(std::any::type_name::<T>());
            msg.push(')');
            Error::type_error(msg)
        } else {
            err
        }
    }
}

/// Ensures a condition is true; otherwise returns an [`enum@Error`].
///
/// # Examples
/// ```
/// use protograph_core::ensure;
/// use protograph_core::error::Error;
///
/// fn check_field(n: u32) -> Result<(), Error> {
///     ensure!(n > 0, Error::invalid_tag("field number must be positive"));
///     ensure!(n < 1 << 29, "field {} too large", n);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data($msg));
        }
    };
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)));
        }
    };
}

/// Returns early with an [`Error::InvalidData`].
///
/// # Examples
/// ```
/// use protograph_core::bail;
/// use protograph_core::error::Error;
///
/// fn fail_fast() -> Result<(), Error> {
///     bail!("something went wrong");
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($err:expr) => {
        return Err($crate::error::Error::invalid_data($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_data(format!($fmt, $($arg)*)))
    };
}

/// Returns early with an [`Error::InvalidConfiguration`].
///
/// # Examples
/// ```
/// use protograph_core::not_allowed;
/// use protograph_core::error::Error;
///
/// fn change_frozen(name: &str) -> Result<(), Error> {
///     not_allowed!("type {} is frozen", name);
/// }
/// ```
#[macro_export]
macro_rules! not_allowed {
    ($err:expr) => {
        return Err($crate::error::Error::invalid_configuration($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::invalid_configuration(format!($fmt, $($arg)*)))
    };
}
