// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "okada-offline.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// --- Transport ---
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GZIP: bool = true;
pub const DEFAULT_TRANSPORT_RETRIES: u32 = 0;
pub const DEFAULT_TRANSPORT_BACKOFF_MS: u64 = 500;
pub const DEFAULT_TRANSPORT_MAX_BACKOFF_MS: u64 = 30_000;

// --- Sync ---
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 5;
pub const DEFAULT_MAX_REJECTIONS: u32 = 3;
pub const DEFAULT_INITIAL_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 300_000; // 5 minutes
pub const DEFAULT_MANUAL_SYNC_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PERIODIC_SYNC_INTERVAL_SECS: u64 = 300; // 5 minutes

// --- Worker ---
pub const DEFAULT_CACHE_PREFIX: &str = "okada-admin";
pub const DEFAULT_API_CACHE_PREFIX: &str = "okada-admin-api";
pub const DEFAULT_CACHE_GENERATION: &str = "v2";
pub const DEFAULT_API_PREFIX: &str = "/api/trpc/";
pub const DEFAULT_OFFLINE_PAGE: &str = "/offline.html";
pub const DEFAULT_ORIGIN: &str = "http://localhost";
pub const DEFAULT_L1_CAPACITY: u64 = 1_000;
pub const DEFAULT_L1_TTL_SECS: u64 = 3_600; // 1 hour

pub const DEFAULT_STATIC_ASSETS: &[&str] = &["/", "/index.html", "/manifest.json", "/offline.html"];

/// Read-only procedures whose responses may be served from cache when offline.
pub const DEFAULT_CACHEABLE_API_PATTERNS: &[&str] = &[
    // Riders
    r"/api/trpc/riders\.getShifts",
    r"/api/trpc/riders\.getAvailability",
    r"/api/trpc/riders\.getAllRiders",
    r"/api/trpc/riders\.list",
    // Orders
    r"/api/trpc/orders\.list",
    r"/api/trpc/orders\.getById",
    r"/api/trpc/orders\.getStats",
    // Products
    r"/api/trpc/products\.list",
    r"/api/trpc/products\.getById",
    r"/api/trpc/products\.getCategories",
    // Users
    r"/api/trpc/users\.list",
    r"/api/trpc/users\.getById",
    // Dashboard
    r"/api/trpc/dashboard\.getStats",
    r"/api/trpc/dashboard\.getRecentOrders",
    // Auth
    r"/api/trpc/auth\.me",
    // I18N
    r"/api/trpc/i18n\.getLanguages",
    r"/api/trpc/i18n\.getTranslations",
];

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = true;
