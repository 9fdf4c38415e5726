/// Static translation of VOLTXT error codes to customer-safe messages.
/// Unknown codes fall through to a generic message so raw service internals
/// never reach the end customer.
pub fn lookup(error_code: &str) -> &'static str {
    match error_code {
        "INVALID_API_KEY" => "Invalid API key. Please check your VOLTXT credentials.",
        "NETWORK_MISMATCH" => {
            "Network configuration mismatch. Please verify your testnet/mainnet settings."
        }
        "NO_DESTINATION_WALLET" => {
            "No destination wallet configured for this network in your VOLTXT account."
        }
        "VALIDATION_ERROR" => "Invalid request data. Please contact support.",
        "SESSION_NOT_FOUND" => "Payment session not found or has expired.",
        "INVOICE_NOT_FOUND" => "Invoice not found or has expired.",
        "AMOUNT_TOO_LOW" => "Payment amount is below the minimum threshold.",
        "AMOUNT_TOO_HIGH" => "Payment amount exceeds the maximum threshold.",
        "EXPIRED_INVOICE" => "This payment session has expired.",
        "CONNECTION_ERROR" => "Unable to connect to VOLTXT service. Please try again.",
        "TIMEOUT_ERROR" => "Request timed out. Please try again.",
        "JSON_DECODE_ERROR" => "Invalid response from payment service.",
        "HTTP_400" => "Bad request. Please check your configuration.",
        "HTTP_401" => "Unauthorized. Please check your API key.",
        "HTTP_403" => "Access forbidden. Please verify your account permissions.",
        "HTTP_404" => "Service endpoint not found.",
        "HTTP_429" => "Too many requests. Please try again later.",
        "HTTP_500" => "Payment service error. Please try again.",
        "HTTP_502" => "Payment service temporarily unavailable.",
        "HTTP_503" => "Payment service maintenance. Please try again later.",
        _ => "An unexpected error occurred.",
    }
}
