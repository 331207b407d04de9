//! # REST API for the Academic Catalog
//!
//! Endpoints for institutes, courses, semesters, and student enrollment.
//! Reads are open to any authenticated caller; writes are admin-only (the
//! services enforce the gating).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use crate::io::rest::error::ApiResult;
use crate::io::rest::extractors::Caller;
use crate::AppState;
use shared::{CreateCourseRequest, CreateInstituteRequest, CreateSemesterRequest, EnrollResponse};

#[derive(Debug, Deserialize)]
pub struct InstituteListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CourseListQuery {
    pub institute_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SemesterListQuery {
    pub course_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create a new institute
pub async fn create_institute(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateInstituteRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /api/institutes - code: {}", request.code);

    let institute = state.academic_service.create_institute(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(institute)))
}

/// List institutes
pub async fn list_institutes(
    State(state): State<AppState>,
    Caller(_caller): Caller,
    Query(query): Query<InstituteListQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/institutes");

    let institutes = state
        .academic_service
        .list_institutes(query.limit.unwrap_or(100), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(institutes))
}

/// Get an institute by ID
pub async fn get_institute(
    State(state): State<AppState>,
    Caller(_caller): Caller,
    Path(institute_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/institutes/{}", institute_id);

    let institute = state.academic_service.get_institute(institute_id).await?;
    Ok(Json(institute))
}

/// Create a new course
pub async fn create_course(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateCourseRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /api/courses - code: {}", request.code);

    let course = state.academic_service.create_course(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// List courses, optionally filtered by institute
pub async fn list_courses(
    State(state): State<AppState>,
    Caller(_caller): Caller,
    Query(query): Query<CourseListQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/courses - query: {:?}", query);

    let courses = state
        .academic_service
        .list_courses(query.institute_id, query.limit.unwrap_or(100), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(courses))
}

/// Get a course by ID
pub async fn get_course(
    State(state): State<AppState>,
    Caller(_caller): Caller,
    Path(course_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/courses/{}", course_id);

    let course = state.academic_service.get_course(course_id).await?;
    Ok(Json(course))
}

/// Enroll a student in a course
pub async fn enroll_student(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path((course_id, student_id)): Path<(i64, i64)>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /api/courses/{}/enroll/{}", course_id, student_id);

    state
        .academic_service
        .enroll_student(&caller, course_id, student_id)
        .await?;
    Ok(Json(EnrollResponse {
        message: format!("Student {} enrolled in course {}", student_id, course_id),
    }))
}

/// Create a new semester
pub async fn create_semester(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(request): Json<CreateSemesterRequest>,
) -> ApiResult<impl IntoResponse> {
    info!("POST /api/semesters - course: {}", request.course_id);

    let semester = state.academic_service.create_semester(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(semester)))
}

/// List semesters, optionally filtered by course
pub async fn list_semesters(
    State(state): State<AppState>,
    Caller(_caller): Caller,
    Query(query): Query<SemesterListQuery>,
) -> ApiResult<impl IntoResponse> {
    info!("GET /api/semesters - query: {:?}", query);

    let semesters = state
        .academic_service
        .list_semesters(query.course_id, query.limit.unwrap_or(100), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(semesters))
}
