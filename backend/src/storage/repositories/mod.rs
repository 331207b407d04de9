//! One repository per aggregate; all SQL lives here.
//!
//! Repositories return `sqlx::Error` untranslated so the service layer can
//! classify unique-constraint violations as conflicts.

pub mod course_repository;
pub mod fee_repository;
pub mod institute_repository;
pub mod payment_repository;
pub mod semester_repository;
pub mod user_repository;

pub use course_repository::CourseRepository;
pub use fee_repository::FeeRepository;
pub use institute_repository::InstituteRepository;
pub use payment_repository::PaymentRepository;
pub use semester_repository::SemesterRepository;
pub use user_repository::UserRepository;
