use crate::{
    api::{accounting_period, agent_document, change_log, employee, pickup_point, report, schedule},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    store::Backend,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Context, Result};

type Limit = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-route rate limits. Built once so every worker shares the same buckets.
#[derive(Clone)]
pub struct RateLimits {
    login: Limit,
    register: Limit,
    refresh: Limit,
    protected: Limit,
}

fn build_limit(name: &str, requests_per_min: u32) -> Result<Limit> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .with_context(|| format!("invalid {name} rate limit"))
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limit("login", config.rate_login_per_min)?,
            register: build_limit("register", config.rate_register_per_min)?,
            refresh: build_limit("refresh", config.rate_refresh_per_min)?,
            protected: build_limit("protected", config.rate_protected_per_min)?,
        })
    }
}

pub fn configure<S: Backend>(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&limits.login))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(Governor::new(&limits.register))
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&limits.refresh))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&limits.login))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&limits.protected)) // rate limiting
            .service(handlers::me)
            .configure(reference_routes)
            .configure(document_routes::<S>),
    );
}

/// Reference books, backed by the MySQL pool directly.
pub fn reference_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/employees")
            // /employees
            .service(
                web::resource("")
                    .route(web::post().to(employee::create_employee))
                    .route(web::get().to(employee::list_employees)),
            )
            // /employees/{id}
            .service(
                web::resource("/{id}")
                    .route(web::put().to(employee::update_employee))
                    .route(web::get().to(employee::get_employee)),
            )
            // /employees/{id}/deactivate
            .service(
                web::resource("/{id}/deactivate")
                    .route(web::put().to(employee::deactivate_employee)),
            ),
    )
    .service(
        web::scope("/pickup-points")
            .service(
                web::resource("")
                    .route(web::post().to(pickup_point::create_pickup_point))
                    .route(web::get().to(pickup_point::list_pickup_points)),
            )
            .service(web::resource("/{id}").route(web::get().to(pickup_point::get_pickup_point))),
    )
    .service(
        web::scope("/accounting-periods")
            .service(
                web::resource("")
                    .route(web::post().to(accounting_period::create_accounting_period))
                    .route(web::get().to(accounting_period::list_accounting_periods)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(accounting_period::get_accounting_period)),
            ),
    );
}

/// Schedules, agent documents, the change log and reports, over any backend.
pub fn document_routes<S: Backend>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/schedules")
            // /schedules
            .service(
                web::resource("")
                    .route(web::get().to(schedule::list_schedules::<S>))
                    .route(web::post().to(schedule::create_schedule::<S>)),
            )
            // /schedules/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(schedule::get_schedule::<S>))
                    .route(web::delete().to(schedule::delete_schedule::<S>)),
            )
            .service(
                web::resource("/{id}/conflicts")
                    .route(web::get().to(schedule::schedule_conflicts::<S>)),
            )
            .service(
                web::resource("/{id}/submit").route(web::put().to(schedule::submit_schedule::<S>)),
            )
            .service(
                web::resource("/{id}/approve")
                    .route(web::put().to(schedule::approve_schedule::<S>)),
            )
            .service(
                web::resource("/{id}/reject").route(web::put().to(schedule::reject_schedule::<S>)),
            )
            // /schedules/{id}/shifts
            .service(web::resource("/{id}/shifts").route(web::post().to(schedule::add_shift::<S>)))
            .service(
                web::resource("/{id}/shifts/{shift_id}")
                    .route(web::put().to(schedule::update_shift::<S>))
                    .route(web::delete().to(schedule::remove_shift::<S>)),
            ),
    )
    .service(web::resource("/shifts/conflict-check").route(web::post().to(schedule::conflict_check)))
    .service(web::resource("/change-log").route(web::get().to(change_log::list_change_log::<S>)))
    .service(
        web::scope("/agent-documents")
            .service(
                web::resource("")
                    .route(web::get().to(agent_document::list_agent_documents::<S>))
                    .route(web::post().to(agent_document::create_agent_document::<S>)),
            )
            .service(
                web::resource("/{id}").route(web::get().to(agent_document::get_agent_document::<S>)),
            ),
    )
    .service(
        web::scope("/agents")
            .service(web::resource("").route(web::get().to(agent_document::list_agents::<S>)))
            .service(web::resource("/{id}").route(web::get().to(agent_document::get_agent::<S>))),
    )
    .service(
        web::resource("/reports/work-schedule/{employee_id}")
            .route(web::post().to(report::generate_work_schedule_report::<S>)),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token
