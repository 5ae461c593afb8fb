pub mod calculated_invoice;
pub mod invoice;
pub mod invoice_list;
pub mod line_item;

pub use calculated_invoice::{CalculatedInvoice, InvoiceRequest, Recipient, Supplier};
pub use invoice::{Invoice, InvoiceStatus};
pub use invoice_list::{
    InvoiceListItem, InvoiceListQuery, InvoiceSummary, PaginatedInvoiceList, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
pub use line_item::{LineItem, LineItemRequest, MAX_AMOUNT};
