//! This library issues digital wallet passes for [Apple Wallet] and [Google Wallet].
//!
//! [Apple Wallet]: <https://developer.apple.com/documentation/walletpasses>
//! [Google Wallet]: <https://developers.google.com/wallet/generic>
//!
//! # Configuration
//!
//! Both wallets are configured through a [`WalletsConfig`], usually loaded once at startup from
//! the process environment:
//!
//! ```ignore
//! use wallet_passes::config::WalletsConfig;
//!
//! let config = WalletsConfig::from_env()?;
//! ```
//!
//! The recognised variables are listed in the [`config`] module. Values are only checked when a
//! wallet service is constructed, so an application using a single provider does not need to
//! configure the other one.
//!
//! [`WalletsConfig`]: crate::config::WalletsConfig
//!
//! # Apple Wallet Usage
//!
//! An [`AppleWallet`] signs passes with the Pass Type ID certificate of the issuer. Each pass is
//! assembled with a [`PassBuilder`] and packaged as a signed `.pkpass` archive:
//!
//! ```ignore
//! use wallet_passes::apple::{parameters::{Barcode, PassStyle, SerialNumber}, AppleWallet};
//! use wallet_passes::core::object::UntypedObject;
//!
//! let wallet = AppleWallet::new(&config)?;
//!
//! let mut overrides = UntypedObject::new();
//! overrides.insert(SerialNumber("ticket-42".into()));
//!
//! let pkpass = wallet
//!     .build_pass(overrides)
//!     .with_barcode(Barcode::qr("ticket-42"))
//!     .with_pass_style(PassStyle::EventTicket)
//!     .add_primary_field("event", "Event", "Summer Festival")
//!     .add_back_field("terms", "Terms", "No refunds")
//!     .download()
//!     .await?;
//!
//! // Serve `pkpass.bytes()` as `PkPass::MIME_TYPE`, named `pkpass.file_name()`.
//! ```
//!
//! Signing can be delegated, e.g. to an HSM, by implementing the [`ManifestSigner`] trait and
//! passing it to [`AppleWallet::with_signer`].
//!
//! [`AppleWallet`]: crate::apple::AppleWallet
//! [`AppleWallet::with_signer`]: crate::apple::AppleWallet::with_signer
//! [`PassBuilder`]: crate::apple::PassBuilder
//! [`ManifestSigner`]: crate::apple::signer::ManifestSigner
//!
//! # Google Wallet Usage
//!
//! A [`GoogleWallet`] authenticates with a service account of the issuer. Objects are assembled
//! with an [`ObjectBuilder`], published through the Wallet Objects REST API and handed to the
//! holder through a signed save link:
//!
//! ```ignore
//! use wallet_passes::google::{parameters::Barcode, GoogleWallet, WalletObject};
//!
//! let wallet = GoogleWallet::new(&config)?;
//!
//! let object = wallet
//!     .build_object("ticket-42", "summer-festival")
//!     .with_card_title("Summer Festival")
//!     .with_header("Ada Lovelace")
//!     .with_barcode(Barcode::qr("ticket-42"))
//!     .find_or_create()
//!     .await?;
//!
//! let link = wallet.save_link(object.id(), object.class_id())?;
//! ```
//!
//! The transport can be replaced by implementing the [`AsyncHttpClient`] trait.
//!
//! [`GoogleWallet`]: crate::google::GoogleWallet
//! [`ObjectBuilder`]: crate::google::ObjectBuilder
//! [`AsyncHttpClient`]: crate::core::util::AsyncHttpClient
//!
//! # Payloads
//!
//! Pass and object payloads are kept as [`UntypedObject`]s. Fields the library knows about are
//! set through [`TypedParameter`]s; any other key of the provider schema can be set as raw JSON
//! with the `with_field` methods of the builders.
//!
//! [`UntypedObject`]: crate::core::object::UntypedObject
//! [`TypedParameter`]: crate::core::object::TypedParameter
//!
//! # Logging
//!
//! The library emits [`tracing`] events and leaves the subscriber setup to the application.

pub mod apple;
pub mod config;
pub mod core;
pub mod error;
pub mod google;

pub use error::{WalletError, WalletResult};
