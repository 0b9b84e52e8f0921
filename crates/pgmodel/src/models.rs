//! The fixed set of property-management tables.

use crate::client::ConnectionPool;
use crate::executor::StatementExecutor;
use crate::model::ModelHandle;
use std::sync::Arc;

macro_rules! define_models {
    ($($field:ident => $table:literal),+ $(,)?) => {
        /// Every table identifier, in declaration order.
        pub const TABLES: &[&str] = &[$($table),+];

        /// One [`ModelHandle`] per table, sharing a single executor.
        pub struct Models<P> {
            executor: Arc<StatementExecutor<P>>,
            $(
                #[doc = concat!("Handle for `\"", $table, "\"`.")]
                pub $field: ModelHandle<P>,
            )+
        }

        impl<P: ConnectionPool> Models<P> {
            /// Create every handle over a shared executor.
            pub fn new(executor: Arc<StatementExecutor<P>>) -> Self {
                Self {
                    $($field: ModelHandle::new($table, Arc::clone(&executor)),)+
                    executor,
                }
            }

            /// Look up a handle by table identifier.
            pub fn get(&self, table: &str) -> Option<&ModelHandle<P>> {
                match table {
                    $($table => Some(&self.$field),)+
                    _ => None,
                }
            }
        }

        impl<P> Clone for Models<P> {
            fn clone(&self) -> Self {
                Self {
                    executor: Arc::clone(&self.executor),
                    $($field: self.$field.clone(),)+
                }
            }
        }
    };
}

define_models! {
    property => "Property",
    unit => "Unit",
    tenant => "Tenant",
    lease => "Lease",
    payment => "Payment",
    maintenance_request => "MaintenanceRequest",
    user => "User",
}

impl<P: ConnectionPool> Models<P> {
    /// Build the registry over a pool without monitoring.
    pub fn from_pool(pool: P) -> Self {
        Self::new(Arc::new(StatementExecutor::new(pool)))
    }

    /// The executor every handle shares.
    pub fn executor(&self) -> &Arc<StatementExecutor<P>> {
        &self.executor
    }
}

#[cfg(feature = "pool")]
impl Models<deadpool_postgres::Pool> {
    /// Create the pool and monitors described by `config` and bind every table.
    ///
    /// No connection is opened until the first statement.
    pub fn connect(config: &crate::config::DbConfig) -> crate::error::ModelResult<Self> {
        let pool = config.create_pool()?;
        tracing::info!(
            target: "pgmodel.sql",
            max_size = config.pool_max_size,
            log_path = %config.log.path.display(),
            quiet = config.exec_mode().is_quiet(),
            "connection pool created"
        );
        let executor = StatementExecutor::new(pool).with_monitor(config.monitor());
        Ok(Self::new(Arc::new(executor)))
    }
}

impl<P> std::fmt::Debug for Models<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Models").field("tables", &TABLES).finish()
    }
}
