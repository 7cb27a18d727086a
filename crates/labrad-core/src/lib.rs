//! LabRAD Core - setting dispatch and name resolution for instrument servers.
//!
//! A server exposes *settings*: named, possibly overloaded remote procedures
//! addressed on the wire by numeric ID. This crate covers both ends of that:
//!
//! - inbound: match a tagged value against each overload's type signature,
//!   unpack it into native arguments and call the bound implementation
//! - outbound: turn server and setting names into IDs through a cached
//!   directory lookup
//!
//! # Example
//!
//! ```rust,ignore
//! use labrad_core::{Args, SettingBuilder, SettingsTable, TaggedValue, TypeSignature};
//!
//! struct Adder;
//!
//! let table = SettingsTable::new().with(
//!     SettingBuilder::new(1, "add")
//!         .accepts(TypeSignature::cluster([TypeSignature::Int, TypeSignature::Int]), |_: &Adder, args: Args| {
//!             Ok(TaggedValue::Int(args.int(0)? + args.int(1)?).into())
//!         }),
//! )?;
//!
//! let sum = table.handle(&Adder, labrad_core::SettingId(1), &TaggedValue::cluster([2i32.into(), 3i32.into()]))?;
//! assert_eq!(sum, TaggedValue::Int(5));
//! ```

pub mod config;
pub mod data;
pub mod descriptor;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod ipc;
pub mod resolver;
pub mod setting;
pub mod signature;
pub mod unpack;

pub use config::{IpcConfig, ManagerConfig};
pub use data::{ServerId, SettingId, TaggedValue, TypeSignature};
pub use descriptor::{describe, RegistrationDescriptor};
pub use directory::{Directory, DirectoryClient, Registry, ServerInfo, ServerSummary};
pub use dispatch::OverloadDispatcher;
pub use error::{LabradError, Result};
pub use handler::{Reply, SettingFn, SettingHandler};
pub use resolver::{Record, Request, Resolver, Target};
pub use setting::{Setting, SettingBuilder, SettingsTable};
pub use signature::matches;
pub use unpack::{Arg, Args, Extract, UnpackError, Unpacker};
