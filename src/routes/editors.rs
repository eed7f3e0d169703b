use actix_web::web;

use crate::handlers::editors;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/editors")
            .route("", web::post().to(editors::open_editor))
            .route("/{id}", web::get().to(editors::get_editor))
            .route("/{id}", web::delete().to(editors::close_editor))
            .route("/{id}/refresh", web::post().to(editors::refresh_editor))
            .route("/{id}/reset", web::post().to(editors::reset_editor))
            .route("/{id}/batch", web::get().to(editors::preview_batch))
            .route("/{id}/save", web::post().to(editors::save_editor))
            .route("/{id}/shifts", web::post().to(editors::create_shift))
            .route(
                "/{id}/shifts/{key}/move",
                web::post().to(editors::move_shift),
            )
            .route(
                "/{id}/shifts/{key}/assign",
                web::post().to(editors::assign_shift),
            )
            .route(
                "/{id}/shifts/{key}/unassign",
                web::post().to(editors::unassign_shift),
            )
            .route("/{id}/shifts/{key}", web::delete().to(editors::remove_shift)),
    );
}
