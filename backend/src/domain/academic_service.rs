use chrono::Utc;
use tracing::info;

use crate::domain::auth::{self, has_any_role, ROLE_ADMIN, ROLE_STUDENT};
use crate::domain::error::{DomainError, DomainResult};
use crate::storage::{CourseRepository, InstituteRepository, SemesterRepository, UserRepository};
use shared::{
    Course, CreateCourseRequest, CreateInstituteRequest, CreateSemesterRequest, Institute,
    Semester, User,
};

/// Service for the academic catalog: institutes, courses, semesters, and
/// student enrollment
#[derive(Clone)]
pub struct AcademicService {
    institutes: InstituteRepository,
    courses: CourseRepository,
    semesters: SemesterRepository,
    users: UserRepository,
}

impl AcademicService {
    pub fn new(
        institutes: InstituteRepository,
        courses: CourseRepository,
        semesters: SemesterRepository,
        users: UserRepository,
    ) -> Self {
        Self {
            institutes,
            courses,
            semesters,
            users,
        }
    }

    /// Create a new institute. Admin only.
    pub async fn create_institute(
        &self,
        caller: &User,
        request: CreateInstituteRequest,
    ) -> DomainResult<Institute> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        if request.name.trim().is_empty() || request.code.trim().is_empty() {
            return Err(DomainError::bad_request("Institute name and code are required"));
        }

        let now = Utc::now().to_rfc3339();
        // Unique name/code constraints surface as conflict
        let institute_id = self
            .institutes
            .create_institute(
                request.name.trim(),
                request.code.trim(),
                request.description.as_deref(),
                &now,
            )
            .await?;

        info!("Created institute {} ({})", institute_id, request.code.trim());
        self.get_institute(institute_id).await
    }

    pub async fn get_institute(&self, institute_id: i64) -> DomainResult<Institute> {
        self.institutes
            .get_institute(institute_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Institute not found"))
    }

    pub async fn list_institutes(&self, limit: i64, offset: i64) -> DomainResult<Vec<Institute>> {
        Ok(self.institutes.list_institutes(limit, offset).await?)
    }

    /// Create a new course under an institute. Admin only.
    pub async fn create_course(
        &self,
        caller: &User,
        request: CreateCourseRequest,
    ) -> DomainResult<Course> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        self.institutes
            .get_institute(request.institute_id)
            .await?
            .ok_or_else(|| DomainError::not_found("The institute with this id does not exist"))?;

        if request.name.trim().is_empty() || request.code.trim().is_empty() {
            return Err(DomainError::bad_request("Course name and code are required"));
        }
        if request.duration_years < 1 {
            return Err(DomainError::bad_request("Course duration must be at least one year"));
        }

        let now = Utc::now().to_rfc3339();
        let course_id = self
            .courses
            .create_course(
                request.institute_id,
                request.name.trim(),
                request.code.trim(),
                request.duration_years,
                request.description.as_deref(),
                request.is_active.unwrap_or(true),
                &now,
            )
            .await?;

        info!("Created course {} ({})", course_id, request.code.trim());
        self.get_course(course_id).await
    }

    pub async fn get_course(&self, course_id: i64) -> DomainResult<Course> {
        self.courses
            .get_course(course_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Course not found"))
    }

    pub async fn list_courses(
        &self,
        institute_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<Course>> {
        Ok(self.courses.list_courses(institute_id, limit, offset).await?)
    }

    /// Create a new semester within a course. Admin only.
    pub async fn create_semester(
        &self,
        caller: &User,
        request: CreateSemesterRequest,
    ) -> DomainResult<Semester> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        self.courses
            .get_course(request.course_id)
            .await?
            .ok_or_else(|| DomainError::not_found("The course with this id does not exist"))?;

        if request.name.trim().is_empty() {
            return Err(DomainError::bad_request("Semester name is required"));
        }
        if request.position < 1 {
            return Err(DomainError::bad_request("Semester position must be at least 1"));
        }
        // RFC 3339 strings order chronologically
        if request.end_date < request.start_date {
            return Err(DomainError::bad_request(
                "Semester end date must not be before its start date",
            ));
        }

        let semester_id = self
            .semesters
            .create_semester(
                request.course_id,
                request.name.trim(),
                request.kind,
                request.position,
                &request.start_date,
                &request.end_date,
            )
            .await?;

        info!("Created semester {} in course {}", semester_id, request.course_id);
        self.semesters
            .get_semester(semester_id)
            .await?
            .ok_or_else(|| {
                DomainError::Internal(anyhow::anyhow!("semester {} missing after insert", semester_id))
            })
    }

    pub async fn list_semesters(
        &self,
        course_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> DomainResult<Vec<Semester>> {
        Ok(self.semesters.list_semesters(course_id, limit, offset).await?)
    }

    /// Enroll a student in a course. Admin only.
    ///
    /// The target user must hold the student role; double enrollment is
    /// rejected and the relation never holds duplicate rows.
    pub async fn enroll_student(
        &self,
        caller: &User,
        course_id: i64,
        student_id: i64,
    ) -> DomainResult<()> {
        auth::require_any_role(caller, &[ROLE_ADMIN])?;

        self.courses
            .get_course(course_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Course not found"))?;

        let student = self
            .users
            .get_user(student_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Student not found"))?;

        if !has_any_role(&student.roles, &[ROLE_STUDENT]) {
            return Err(DomainError::bad_request("User is not a student"));
        }

        if self.courses.is_enrolled(student_id, course_id).await? {
            return Err(DomainError::bad_request("Student already enrolled in this course"));
        }

        let now = Utc::now().to_rfc3339();
        self.courses.enroll(student_id, course_id, &now).await?;

        info!("Enrolled student {} in course {}", student_id, course_id);
        Ok(())
    }
}
