//! SQLite database for the wayfi provisioning server.

wayfi_core::define_database!(
    ProvisioningDatabase,
    "Provisioning database migrations complete"
);
