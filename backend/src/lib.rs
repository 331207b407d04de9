//! # University Administration Backend
//!
//! REST backend for user/role management, the academic catalog, and the
//! fee/payment/receipt workflow over a relational store.
//!
//! The crate follows a layered architecture:
//! ```text
//! IO Layer (REST API, handlers)
//!     |
//! Domain Layer (services, authorization, error taxonomy)
//!     |
//! Storage Layer (SQLite repositories)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod render;
pub mod storage;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::domain::{
    AcademicService, FeeService, PaymentService, ReceiptService, ReportService, UserService,
};
use crate::render::ReceiptRenderer;
use crate::storage::{
    CourseRepository, DbConnection, FeeRepository, InstituteRepository, PaymentRepository,
    SemesterRepository, UserRepository,
};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub academic_service: AcademicService,
    pub fee_service: FeeService,
    pub payment_service: PaymentService,
    pub receipt_service: ReceiptService,
    pub report_service: ReportService,
}

/// Wire repositories and services over an open database connection
fn build_state(db: DbConnection) -> AppState {
    let users = UserRepository::new(db.clone());
    let institutes = InstituteRepository::new(db.clone());
    let courses = CourseRepository::new(db.clone());
    let semesters = SemesterRepository::new(db.clone());
    let fees = FeeRepository::new(db.clone());
    let payments = PaymentRepository::new(db);

    AppState {
        user_service: UserService::new(users.clone()),
        academic_service: AcademicService::new(
            institutes,
            courses.clone(),
            semesters.clone(),
            users.clone(),
        ),
        fee_service: FeeService::new(fees.clone(), courses.clone(), semesters.clone(), users.clone()),
        payment_service: PaymentService::new(
            payments.clone(),
            fees.clone(),
            courses,
            semesters.clone(),
            users.clone(),
        ),
        receipt_service: ReceiptService::new(payments.clone(), fees.clone(), semesters, users, ReceiptRenderer::new()),
        report_service: ReportService::new(fees, payments),
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::new(&config.database_url).await?;

    info!("Setting up domain services");
    Ok(build_state(db))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    // CORS setup to allow a browser frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/users", get(io::rest::user_apis::list_users).post(io::rest::user_apis::create_user))
        .route(
            "/users/:user_id",
            get(io::rest::user_apis::get_user).put(io::rest::user_apis::update_user),
        )
        .route(
            "/institutes",
            get(io::rest::academic_apis::list_institutes).post(io::rest::academic_apis::create_institute),
        )
        .route("/institutes/:institute_id", get(io::rest::academic_apis::get_institute))
        .route(
            "/courses",
            get(io::rest::academic_apis::list_courses).post(io::rest::academic_apis::create_course),
        )
        .route("/courses/:course_id", get(io::rest::academic_apis::get_course))
        .route(
            "/courses/:course_id/enroll/:student_id",
            post(io::rest::academic_apis::enroll_student),
        )
        .route(
            "/semesters",
            get(io::rest::academic_apis::list_semesters).post(io::rest::academic_apis::create_semester),
        )
        .route(
            "/standard-fees",
            get(io::rest::fee_apis::list_standard_fees).post(io::rest::fee_apis::create_standard_fee),
        )
        .route(
            "/standard-fees/:standard_fee_id",
            axum::routing::put(io::rest::fee_apis::update_standard_fee)
                .delete(io::rest::fee_apis::delete_standard_fee),
        )
        .route(
            "/student-fees",
            get(io::rest::fee_apis::list_student_fees).post(io::rest::fee_apis::create_student_fee),
        )
        .route(
            "/payments",
            get(io::rest::payment_apis::list_payments).post(io::rest::payment_apis::create_payment),
        )
        .route("/receipts/:receipt_id/download", get(io::rest::receipt_apis::download_receipt))
        .route("/students/:student_id/receipts", get(io::rest::receipt_apis::get_student_receipts))
        .route("/finance/summary", get(io::rest::report_apis::get_finance_summary));

    Ok(Router::new().nest("/api", api_routes).layer(cors).with_state(app_state))
}
