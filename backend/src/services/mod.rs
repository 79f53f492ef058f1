pub mod bulk_upload;
